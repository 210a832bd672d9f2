/// Terminal state of one message run.
///
/// Every variant except `AlreadyParsed` corresponds to exactly one ledger
/// marker; `AlreadyParsed` means the marker from an earlier run was found
/// and nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    AlreadyParsed,
    BodyTooLarge,
    NotNewsletter,
    /// Extraction ran but no candidate survived normalization and the gate.
    NoEvents { dropped: usize },
    Saved { saved: usize, dropped: usize },
}

impl MessageOutcome {
    /// The `(parsed_ok, note)` pair written to the processing ledger, or
    /// `None` when no marker is written.
    pub fn ledger_entry(&self) -> Option<(bool, &'static str)> {
        match self {
            MessageOutcome::AlreadyParsed => None,
            MessageOutcome::BodyTooLarge => Some((false, "body_too_large")),
            MessageOutcome::NotNewsletter => Some((false, "not_newsletter")),
            MessageOutcome::NoEvents { .. } => Some((true, "no_events_found")),
            MessageOutcome::Saved { .. } => Some((true, "is_newsletter")),
        }
    }
}

/// Counters for one `run_batch` invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub already_parsed: usize,
    pub too_large: usize,
    pub not_newsletter: usize,
    pub no_events: usize,
    pub saved_messages: usize,
    pub saved_events: usize,
    pub dropped_candidates: usize,
    /// Messages that hit a fatal error and were left unmarked for retry.
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &MessageOutcome) {
        match outcome {
            MessageOutcome::AlreadyParsed => self.already_parsed += 1,
            MessageOutcome::BodyTooLarge => self.too_large += 1,
            MessageOutcome::NotNewsletter => self.not_newsletter += 1,
            MessageOutcome::NoEvents { dropped } => {
                self.no_events += 1;
                self.dropped_candidates += dropped;
            }
            MessageOutcome::Saved { saved, dropped } => {
                self.saved_messages += 1;
                self.saved_events += saved;
                self.dropped_candidates += dropped;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_entries_per_outcome() {
        assert_eq!(MessageOutcome::AlreadyParsed.ledger_entry(), None);
        assert_eq!(
            MessageOutcome::BodyTooLarge.ledger_entry(),
            Some((false, "body_too_large"))
        );
        assert_eq!(
            MessageOutcome::NotNewsletter.ledger_entry(),
            Some((false, "not_newsletter"))
        );
        assert_eq!(
            MessageOutcome::NoEvents { dropped: 2 }.ledger_entry(),
            Some((true, "no_events_found"))
        );
        assert_eq!(
            MessageOutcome::Saved { saved: 3, dropped: 0 }.ledger_entry(),
            Some((true, "is_newsletter"))
        );
    }

    #[test]
    fn test_summary_accumulates_outcomes() {
        let mut summary = BatchSummary::default();
        summary.record(&MessageOutcome::AlreadyParsed);
        summary.record(&MessageOutcome::Saved { saved: 2, dropped: 1 });
        summary.record(&MessageOutcome::NoEvents { dropped: 3 });

        assert_eq!(summary.already_parsed, 1);
        assert_eq!(summary.saved_messages, 1);
        assert_eq!(summary.saved_events, 2);
        assert_eq!(summary.no_events, 1);
        assert_eq!(summary.dropped_candidates, 4);
        assert_eq!(summary.failed, 0);
    }
}
