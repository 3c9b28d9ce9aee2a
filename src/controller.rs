//! Try-on session state machine.
//!
//! Owns the three image slots and the `idle -> submitting -> success/failed`
//! lifecycle, independent of any UI binding. All mutation happens on one
//! cooperative thread; asynchronous file reads are reconciled through
//! [`ReadTicket`]s so that only the most recently started read per slot is
//! observed.

use crate::asset::ImageAsset;
use crate::error::Result;
use crate::gemini::TryOnProvider;
use crate::request::{Garment, TryOnRequest};

/// Where the controller is in the submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No submission in flight and no result on display.
    #[default]
    Idle,
    /// A submission is in flight; the trigger is disabled.
    Submitting,
    /// The last submission produced an image.
    Succeeded,
    /// The last submission ended with an error message.
    Failed,
}

/// One of the three image inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    /// The mandatory person photo.
    Person,
    /// The optional top garment photo.
    Top,
    /// The optional bottom garment photo.
    Bottom,
}

/// Proof that a read was started for a slot.
///
/// A completion is honored only while its ticket is still the latest issued
/// for that slot; starting a new read or clearing the slot supersedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTicket {
    slot: ImageSlot,
    seq: u64,
}

#[derive(Debug, Default)]
struct Slot {
    asset: Option<ImageAsset>,
    seq: u64,
}

impl Slot {
    fn supersede(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// Orchestrates intake -> build -> send -> display.
#[derive(Debug, Default)]
pub struct Controller {
    person: Slot,
    top: Slot,
    bottom: Slot,
    phase: Phase,
    result: Option<String>,
    error: Option<String>,
}

impl Controller {
    /// Creates an empty controller in the `Idle` phase.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, slot: ImageSlot) -> &Slot {
        match slot {
            ImageSlot::Person => &self.person,
            ImageSlot::Top => &self.top,
            ImageSlot::Bottom => &self.bottom,
        }
    }

    fn slot_mut(&mut self, slot: ImageSlot) -> &mut Slot {
        match slot {
            ImageSlot::Person => &mut self.person,
            ImageSlot::Top => &mut self.top,
            ImageSlot::Bottom => &mut self.bottom,
        }
    }

    /// Returns the image currently held in a slot.
    pub fn image(&self, slot: ImageSlot) -> Option<&ImageAsset> {
        self.slot(slot).asset.as_ref()
    }

    /// Stores an image directly into a slot, superseding any read in flight.
    /// Accepted in any phase; intake is independent per slot.
    pub fn set_image(&mut self, slot: ImageSlot, asset: ImageAsset) {
        let s = self.slot_mut(slot);
        s.supersede();
        s.asset = Some(asset);
    }

    /// Clears a slot, superseding any read in flight for it.
    pub fn clear_image(&mut self, slot: ImageSlot) {
        let s = self.slot_mut(slot);
        s.supersede();
        s.asset = None;
    }

    /// Marks the start of an asynchronous file read for a slot.
    pub fn begin_read(&mut self, slot: ImageSlot) -> ReadTicket {
        let seq = self.slot_mut(slot).supersede();
        ReadTicket { slot, seq }
    }

    /// Delivers the outcome of an asynchronous file read.
    ///
    /// Returns `true` if the completion was honored. A superseded ticket is
    /// discarded without touching any state; a failed read surfaces its
    /// message without mutating the slot.
    pub fn finish_read(&mut self, ticket: ReadTicket, outcome: Result<ImageAsset>) -> bool {
        if self.slot(ticket.slot).seq != ticket.seq {
            tracing::debug!(slot = ?ticket.slot, "discarding superseded file read");
            return false;
        }
        match outcome {
            Ok(asset) => self.slot_mut(ticket.slot).asset = Some(asset),
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The displayed result image as a data URL, if the last submission
    /// succeeded.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// The displayed error message, if any. At most one is visible at a time.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the trigger action is enabled: person present, at least one
    /// garment present, and no submission in flight.
    pub fn can_submit(&self) -> bool {
        self.phase != Phase::Submitting
            && self.person.asset.is_some()
            && (self.top.asset.is_some() || self.bottom.asset.is_some())
    }

    /// Runs one submission: validate, build, send, and resolve to exactly
    /// one of `Succeeded` or `Failed`.
    ///
    /// Validation failures surface a message and leave the phase `Idle`
    /// without calling the provider.
    pub async fn submit<P: TryOnProvider + ?Sized>(&mut self, provider: &P) {
        if self.phase == Phase::Submitting {
            return;
        }
        if self.person.asset.is_none() {
            self.error = Some("Please upload a photo of a person.".into());
            self.phase = Phase::Idle;
            return;
        }
        if self.top.asset.is_none() && self.bottom.asset.is_none() {
            self.error = Some("Please upload at least one garment photo.".into());
            self.phase = Phase::Idle;
            return;
        }

        self.error = None;
        self.result = None;
        self.phase = Phase::Submitting;

        let request = self.build_request();
        match provider.try_on(&request).await {
            Ok(image) => {
                self.result = Some(image.data_url());
                self.phase = Phase::Succeeded;
            }
            Err(e) => {
                tracing::error!(error = %e, "virtual try-on failed");
                self.error = Some(e.to_string());
                self.phase = Phase::Failed;
            }
        }
    }

    fn build_request(&self) -> TryOnRequest {
        // Inputs were checked in submit(), so build() cannot fail here
        let mut builder = TryOnRequest::builder().person(
            self.person
                .asset
                .clone()
                .expect("person image checked before build"),
        );
        if let Some(top) = self.top.asset.clone() {
            builder = builder.garment(Garment::Top, top);
        }
        if let Some(bottom) = self.bottom.asset.clone() {
            builder = builder.garment(Garment::Bottom, bottom);
        }
        builder
            .build()
            .expect("garment presence checked before build")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TryOnError;
    use crate::gemini::TryOnImage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider that pops one canned outcome per call and counts calls.
    #[derive(Default)]
    struct MockProvider {
        outcomes: Mutex<Vec<Result<TryOnImage>>>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn with(outcome: Result<TryOnImage>) -> Self {
            Self {
                outcomes: Mutex::new(vec![outcome]),
                calls: AtomicUsize::new(0),
            }
        }

        fn push(&self, outcome: Result<TryOnImage>) {
            self.outcomes.lock().unwrap().push(outcome);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TryOnProvider for MockProvider {
        async fn try_on(&self, _request: &TryOnRequest) -> Result<TryOnImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected provider call")
        }
    }

    fn asset() -> ImageAsset {
        ImageAsset::from_bytes(&[1, 2, 3], "image/png").unwrap()
    }

    #[test]
    fn test_trigger_gating() {
        let mut controller = Controller::new();
        assert!(!controller.can_submit());

        controller.set_image(ImageSlot::Person, asset());
        assert!(!controller.can_submit());

        controller.set_image(ImageSlot::Top, asset());
        assert!(controller.can_submit());

        controller.clear_image(ImageSlot::Top);
        controller.set_image(ImageSlot::Bottom, asset());
        assert!(controller.can_submit());
    }

    #[tokio::test]
    async fn test_submit_without_person_issues_no_call() {
        let provider = MockProvider::default();
        let mut controller = Controller::new();
        controller.set_image(ImageSlot::Top, asset());

        controller.submit(&provider).await;

        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(
            controller.error_message(),
            Some("Please upload a photo of a person.")
        );
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_without_garments_issues_no_call() {
        let provider = MockProvider::default();
        let mut controller = Controller::new();
        controller.set_image(ImageSlot::Person, asset());

        controller.submit(&provider).await;

        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(
            controller.error_message(),
            Some("Please upload at least one garment photo.")
        );
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_success() {
        let provider = MockProvider::with(Ok(TryOnImage::new("AAAA", "image/png")));
        let mut controller = Controller::new();
        controller.set_image(ImageSlot::Person, asset());
        controller.set_image(ImageSlot::Top, asset());

        controller.submit(&provider).await;

        assert_eq!(controller.phase(), Phase::Succeeded);
        assert_eq!(controller.result(), Some("data:image/png;base64,AAAA"));
        assert_eq!(controller.error_message(), None);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_failure_surfaces_message() {
        let provider = MockProvider::with(Err(TryOnError::NoImage));
        let mut controller = Controller::new();
        controller.set_image(ImageSlot::Person, asset());
        controller.set_image(ImageSlot::Bottom, asset());

        controller.submit(&provider).await;

        assert_eq!(controller.phase(), Phase::Failed);
        assert_eq!(controller.result(), None);
        assert_eq!(controller.error_message(), Some("no image was produced"));
    }

    #[tokio::test]
    async fn test_resubmit_clears_prior_error() {
        let provider = MockProvider::with(Err(TryOnError::NoImage));
        let mut controller = Controller::new();
        controller.set_image(ImageSlot::Person, asset());
        controller.set_image(ImageSlot::Top, asset());

        controller.submit(&provider).await;
        assert_eq!(controller.phase(), Phase::Failed);
        assert!(controller.error_message().is_some());

        provider.push(Ok(TryOnImage::new("BBBB", "image/png")));
        controller.submit(&provider).await;

        assert_eq!(controller.phase(), Phase::Succeeded);
        assert_eq!(controller.error_message(), None);
        assert_eq!(controller.result(), Some("data:image/png;base64,BBBB"));
    }

    #[test]
    fn test_last_completed_read_wins() {
        let mut controller = Controller::new();
        let first = controller.begin_read(ImageSlot::Top);
        let second = controller.begin_read(ImageSlot::Top);

        let newer = ImageAsset::from_bytes(&[9, 9, 9], "image/jpeg").unwrap();
        assert!(controller.finish_read(second, Ok(newer.clone())));

        // The first read completes late and must be discarded
        assert!(!controller.finish_read(first, Ok(asset())));
        assert_eq!(controller.image(ImageSlot::Top), Some(&newer));
    }

    #[test]
    fn test_clearing_slot_invalidates_pending_read() {
        let mut controller = Controller::new();
        controller.set_image(ImageSlot::Bottom, asset());

        let ticket = controller.begin_read(ImageSlot::Bottom);
        controller.clear_image(ImageSlot::Bottom);

        assert!(!controller.finish_read(ticket, Ok(asset())));
        assert_eq!(controller.image(ImageSlot::Bottom), None);
    }

    #[test]
    fn test_failed_read_leaves_slot_untouched() {
        let mut controller = Controller::new();
        controller.set_image(ImageSlot::Person, asset());

        let ticket = controller.begin_read(ImageSlot::Person);
        let honored = controller.finish_read(
            ticket,
            Err(TryOnError::InvalidInput("text/plain is not an image media type".into())),
        );

        assert!(honored);
        assert_eq!(controller.image(ImageSlot::Person), Some(&asset()));
        assert!(controller
            .error_message()
            .unwrap()
            .contains("not an image"));
    }

    #[test]
    fn test_reads_are_independent_across_slots() {
        let mut controller = Controller::new();
        let top = controller.begin_read(ImageSlot::Top);
        let bottom = controller.begin_read(ImageSlot::Bottom);

        assert!(controller.finish_read(bottom, Ok(asset())));
        assert!(controller.finish_read(top, Ok(asset())));
        assert!(controller.image(ImageSlot::Top).is_some());
        assert!(controller.image(ImageSlot::Bottom).is_some());
    }
}
