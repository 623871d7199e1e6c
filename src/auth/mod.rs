//! OAuth token lifecycle management

mod launcher;
mod spotify;
mod token;

pub use launcher::{AuthFlowLauncher, AuthRedirect, LoopbackLauncher};
pub use spotify::SpotifyAuthManager;
pub use token::{AuthState, OAuthTokenSet};
