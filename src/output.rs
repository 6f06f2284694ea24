use pickline::LineError;
use serde_json::json;

use crate::cli::CliError;

pub const CLI_EXIT_CODE: i32 = 2;

pub fn emit_output(command: &str, payload: &serde_json::Value) {
    println!(
        "{}",
        json!({
            "command": command,
            "status": "ok",
            "payload": payload,
        })
    );
}

pub fn emit_error(command: &str, error: &LineError) {
    eprintln!(
        "{}",
        json!({
            "command": command,
            "status": "error",
            "error": {
                "code": error.code(),
                "message": error.to_string(),
                "exit_code": error.exit_code(),
            },
        })
    );
}

pub fn emit_cli_error(error: &CliError, suggestions: &[String]) {
    eprintln!(
        "{}",
        json!({
            "status": "error",
            "error": {
                "code": pickline::error::code::CLI_ERROR,
                "message": error.to_string(),
                "exit_code": CLI_EXIT_CODE,
                "suggestions": suggestions,
            },
        })
    );
}
