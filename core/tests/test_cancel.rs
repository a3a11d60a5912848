// Cooperative cancellation: before the first member, from inside a
// callback, and with per-element checks switched off.

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use ingest_core::prelude::*;
    use proptest::prelude::*;

    fn names_doc(count: usize) -> String {
        let names: Vec<String> = (0..count).map(|i| format!("n{i}")).collect();
        format!(r#"{{"name":{},"gender":["x","y"]}}"#, serde_json::to_string(&names).unwrap())
    }

    #[test]
    fn cancelled_before_start_delivers_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Cell::new(0);
        let err = StreamingRecordIngestor::new(IngestConfig::default())
            .unwrap()
            .ingest(names_doc(5).as_bytes(), |_| calls.set(calls.get() + 1), |_| calls.set(calls.get() + 1), &cancel)
            .unwrap_err();
        assert!(matches!(err, IngestError::Cancelled { delivered: 0 }));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn cancellation_is_checked_between_members_only_when_configured() {
        let config = IngestConfig { check_cancel_per_element: false, ..Default::default() };
        let ingestor = StreamingRecordIngestor::new(config).unwrap();
        let cancel = CancellationToken::new();
        let names = Cell::new(0);
        let genders = Cell::new(0);

        let err = ingestor
            .ingest(
                names_doc(10).as_bytes(),
                |_| {
                    names.set(names.get() + 1);
                    cancel.cancel();
                },
                |_| genders.set(genders.get() + 1),
                &cancel,
            )
            .unwrap_err();

        // the whole "name" array finishes, "gender" is never reached
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(names.get(), 10);
        assert_eq!(genders.get(), 0);
    }

    proptest! {
        #[test]
        fn cancel_after_n_elements_stops_after_exactly_n(total in 1usize..60, seed in any::<prop::sample::Index>()) {
            let stop_after = seed.index(total) + 1;
            let cancel = CancellationToken::new();
            let calls = Cell::new(0usize);
            let ingestor = StreamingRecordIngestor::new(IngestConfig::default()).unwrap();

            let result = ingestor.ingest(
                names_doc(total).as_bytes(),
                |_| {
                    calls.set(calls.get() + 1);
                    if calls.get() == stop_after {
                        cancel.cancel();
                    }
                },
                |_| {},
                &cancel,
            );

            let err = result.unwrap_err();
            prop_assert_eq!(calls.get(), stop_after);
            prop_assert!(
                matches!(err, IngestError::Cancelled { delivered } if delivered == stop_after as u64),
                "unexpected error {:?}", err
            );
        }
    }
}
