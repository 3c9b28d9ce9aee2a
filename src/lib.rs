#![warn(missing_docs)]
//! Fitroom - virtual try-on via Gemini image editing.
//!
//! Takes a photo of a person plus one or two garment photos (top, bottom)
//! and asks Gemini to composite the garments onto the person. The crate is
//! split along the pipeline: intake ([`ImageAsset`]), request assembly
//! ([`TryOnRequest`]), the generation call ([`GeminiClient`]), and the
//! session state machine ([`Controller`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use fitroom::{Controller, GeminiClient, ImageAsset, ImageSlot, Phase};
//!
//! #[tokio::main]
//! async fn main() -> fitroom::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!
//!     let mut controller = Controller::new();
//!     let person = std::fs::read("person.jpg")?;
//!     let top = std::fs::read("shirt.png")?;
//!     controller.set_image(ImageSlot::Person, ImageAsset::from_bytes(&person, "image/jpeg")?);
//!     controller.set_image(ImageSlot::Top, ImageAsset::from_bytes(&top, "image/png")?);
//!
//!     controller.submit(&client).await;
//!     if controller.phase() == Phase::Succeeded {
//!         println!("{}", controller.result().unwrap());
//!     }
//!     Ok(())
//! }
//! ```

mod asset;
mod controller;
mod error;
mod gemini;
mod request;

pub use asset::{sniff_mime, ImageAsset};
pub use controller::{Controller, ImageSlot, Phase, ReadTicket};
pub use error::{Result, TryOnError};
pub use gemini::{GeminiClient, GeminiClientBuilder, GeminiModel, TryOnImage, TryOnProvider};
pub use request::{Garment, RequestPart, TryOnRequest, TryOnRequestBuilder};
