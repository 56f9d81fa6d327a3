//! # Live Extraction
//!
//! Incremental variant for in-progress matches. Events arrive one at a time
//! in order; only the open possession is kept. When an event crosses a
//! possession boundary the open unit is closed and its possession-level
//! record is returned.
//!
//! Cancelling drops the accumulator; nothing else needs cleaning up.

use tracing::debug;

use crate::analysis::pipeline::Extractor;
use crate::analysis::possession::PossessionBuilder;
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, Result};
use crate::models::{Event, FeatureRecord};

pub struct LiveExtractor {
    extractor: Extractor,
    open: Option<PossessionBuilder>,
    last_index: Option<u64>,
    closed: usize,
}

impl LiveExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Ok(Self {
            extractor: Extractor::new(config)?,
            open: None,
            last_index: None,
            closed: 0,
        })
    }

    /// Number of possessions closed so far.
    pub fn closed_possessions(&self) -> usize {
        self.closed
    }

    /// Events held for the open possession.
    pub fn pending_events(&self) -> usize {
        self.open.as_ref().map_or(0, PossessionBuilder::len)
    }

    pub fn push(&mut self, event: Event) -> Result<Option<FeatureRecord>> {
        if let Some(previous) = self.last_index {
            if event.index <= previous {
                return Err(ExtractError::MalformedStream {
                    previous,
                    current: event.index,
                });
            }
        }
        self.last_index = Some(event.index);

        let mode = self.extractor.context().config.segmentation;
        let continues = self
            .open
            .as_ref()
            .and_then(PossessionBuilder::last)
            .is_some_and(|prev| !mode.boundary(prev, &event));

        if continues {
            if let Some(open) = self.open.as_mut() {
                open.add(&event);
            }
            return Ok(None);
        }

        let closed = self.close();
        self.open = Some(PossessionBuilder::new(&event));
        Ok(closed)
    }

    /// Close the open possession, if any, at end of stream.
    pub fn finish(mut self) -> Option<FeatureRecord> {
        self.close()
    }

    /// Discard the open possession.
    pub fn cancel(&mut self) {
        if let Some(open) = self.open.take() {
            debug!(events = open.len(), "live extraction cancelled; open possession dropped");
        }
    }

    fn close(&mut self) -> Option<FeatureRecord> {
        let possession = self.open.take()?.build();
        self.closed += 1;
        debug!(possession = %possession.key, events = possession.len(), "possession closed");
        Some(self.extractor.possession_record(&possession))
    }
}
