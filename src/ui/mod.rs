/// Yew front ends: extension popup, OAuth callback page and web dashboard

pub mod components;
pub mod dashboard;
pub mod oauth_callback;
pub mod popup;
