/*
[INPUT]:  Crate HTTP configuration
[OUTPUT]: Public HTTP client surface
[POS]:    HTTP layer - module wiring
[UPDATE]: When public HTTP types change
*/

pub mod client;

pub use client::{BaseUrl, ClientConfig, HttpClient};
