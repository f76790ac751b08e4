use std::path::PathBuf;

use log::{info, warn};
use warp::http::Uri;
use warp::{Filter, Rejection, Reply};

use crate::identity::{page_access, AuthError, Principal, TokenVerifier};

/// Sends a browser without a valid token back to the landing page.
async fn to_landing(err: Rejection) -> Result<impl Reply, Rejection> {
    match err.find::<AuthError>() {
        Some(e) => {
            warn!("Chat page refused: {}", e);
            Ok(warp::redirect::found(Uri::from_static("/")))
        }
        None => Err(err),
    }
}

/// `GET /chat`: the chat page, for holders of a valid token only.
pub fn chat_page(
    verifier: TokenVerifier,
    page: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("chat")
        .and(warp::get())
        .and(page_access(verifier))
        .and(warp::fs::file(page))
        .map(|principal: Principal, file: warp::fs::File| {
            info!("Serving chat page to {}", principal.id);
            file
        })
        .recover(to_landing)
}
