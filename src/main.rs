//! Binary entrypoint that launches the gallery knowledge service.

use std::process::ExitCode;

use gallery_knowledge::start_knowledge_service;

/// Start the knowledge service and run until Ctrl-C.
fn main() -> ExitCode {
    start_knowledge_service::run()
}
