use backlog_core::{BacklogError, FailureClass};
use serde::Serialize;

#[derive(Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    pub api_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<FailureClass>,
}

#[derive(Serialize)]
pub struct ListResponse<T: Serialize> {
    pub items: Vec<T>,
    pub count: usize,
}

fn print_json<T: Serialize>(response: &T, to_stderr: bool) {
    let line = serde_json::to_string(response).unwrap_or_else(|e| {
        format!(r#"{{"success":false,"error":"failed to encode response: {e}"}}"#)
    });
    if to_stderr {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn output_success<T: Serialize>(data: T) {
    let response = CliResponse {
        success: true,
        api_version: env!("CARGO_PKG_VERSION"),
        data: Some(data),
        error: None,
        class: None,
    };
    print_json(&response, false);
}

pub fn output_list<T: Serialize>(items: Vec<T>) {
    let count = items.len();
    output_success(ListResponse { items, count });
}

/// Prints the error envelope with its failure class to stderr and exits 1.
pub fn output_error(err: &BacklogError) -> ! {
    let response: CliResponse<()> = CliResponse {
        success: false,
        api_version: env!("CARGO_PKG_VERSION"),
        data: None,
        error: Some(err.to_string()),
        class: Some(err.failure_class()),
    };
    print_json(&response, true);
    std::process::exit(1);
}
