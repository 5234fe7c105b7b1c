pub mod collection;
pub mod tcgdex;

pub use collection::RestCollectionStore;
pub use tcgdex::TcgdexClient;

use reqwest::{Response, StatusCode};
use tcgtracker_core::CoreError;

pub const USER_AGENT: &str = concat!("TCGTracker/", env!("CARGO_PKG_VERSION"));

fn build_client() -> Result<reqwest::Client, CoreError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(transport)
}

fn transport(e: reqwest::Error) -> CoreError {
    CoreError::Transport(e.to_string())
}

/// `Ok(None)` on 404, `Ok(Some(resp))` on success, `Transport` otherwise.
fn check_status(url: &str, response: Response) -> Result<Option<Response>, CoreError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(CoreError::Transport(format!("{} returned {}", url, status)));
    }
    Ok(Some(response))
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
