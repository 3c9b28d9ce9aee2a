//! Composition request: ordered image parts plus the instruction text.

use crate::asset::ImageAsset;
use crate::error::{Result, TryOnError};

/// One of the two optional garment inputs, distinct from the mandatory
/// person image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Garment {
    /// Upper-body garment slot, ordered before bottom.
    Top,
    /// Lower-body garment slot.
    Bottom,
}

impl Garment {
    /// The phrase used for this slot in the instruction text.
    fn phrase(&self) -> &'static str {
        match self {
            Self::Top => "a top",
            Self::Bottom => "a bottom",
        }
    }
}

/// A validated try-on request: person image first, then the populated
/// garment slots in top-before-bottom order, then one instruction text part.
///
/// Can only be obtained through [`TryOnRequest::builder`], which enforces
/// that the person image is present and at least one garment slot is
/// populated. Part ordering matters: the instruction text refers to "the
/// first image" and "the following image(s)" positionally.
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    person: ImageAsset,
    top: Option<ImageAsset>,
    bottom: Option<ImageAsset>,
}

/// Builder for [`TryOnRequest`].
#[derive(Debug, Clone, Default)]
pub struct TryOnRequestBuilder {
    person: Option<ImageAsset>,
    top: Option<ImageAsset>,
    bottom: Option<ImageAsset>,
}

impl TryOnRequestBuilder {
    /// Sets the mandatory person image.
    pub fn person(mut self, asset: ImageAsset) -> Self {
        self.person = Some(asset);
        self
    }

    /// Sets a garment slot.
    pub fn garment(mut self, slot: Garment, asset: ImageAsset) -> Self {
        match slot {
            Garment::Top => self.top = Some(asset),
            Garment::Bottom => self.bottom = Some(asset),
        }
        self
    }

    /// Validates the inputs and builds the request.
    pub fn build(self) -> Result<TryOnRequest> {
        let person = self
            .person
            .ok_or_else(|| TryOnError::InvalidRequest("a person image is required".into()))?;
        if self.top.is_none() && self.bottom.is_none() {
            return Err(TryOnError::InvalidRequest(
                "at least one garment image is required".into(),
            ));
        }

        Ok(TryOnRequest {
            person,
            top: self.top,
            bottom: self.bottom,
        })
    }
}

/// One part of the ordered request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart<'a> {
    /// An inline image payload.
    Image(&'a ImageAsset),
    /// The instruction text.
    Text(String),
}

impl TryOnRequest {
    /// Creates a new [`TryOnRequestBuilder`].
    pub fn builder() -> TryOnRequestBuilder {
        TryOnRequestBuilder::default()
    }

    /// Returns the person image.
    pub fn person(&self) -> &ImageAsset {
        &self.person
    }

    /// Returns a garment slot's image, if populated.
    pub fn garment(&self, slot: Garment) -> Option<&ImageAsset> {
        match slot {
            Garment::Top => self.top.as_ref(),
            Garment::Bottom => self.bottom.as_ref(),
        }
    }

    /// Returns the ordered part list: person, top (if any), bottom (if any),
    /// then exactly one instruction text part.
    pub fn parts(&self) -> Vec<RequestPart<'_>> {
        let mut parts = vec![RequestPart::Image(&self.person)];
        parts.extend(self.top.as_ref().map(RequestPart::Image));
        parts.extend(self.bottom.as_ref().map(RequestPart::Image));
        parts.push(RequestPart::Text(self.instruction()));
        parts
    }

    /// Builds the instruction text for the populated garment slots.
    ///
    /// This wording is a contract with the generation service, not a UI
    /// string; changing it changes generation behavior.
    pub fn instruction(&self) -> String {
        let mut items = Vec::new();
        if self.top.is_some() {
            items.push(Garment::Top.phrase());
        }
        if self.bottom.is_some() {
            items.push(Garment::Bottom.phrase());
        }

        format!(
            "The first image is a person. The following image(s) contain {}. \
             Your task is to realistically render the clothing item(s) onto the person \
             in the first image. Preserve the background of the original person image. \
             The output image must have the same dimensions as the original person image. \
             Output only the final edited image, with no additional text or commentary.",
            items.join(" and ")
        )
    }
}
