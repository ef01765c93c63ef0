#[cfg(test)]
mod tests {
    use record_grid::data::data_source::{DataSource, RawRecord, StaticDataSource};
    use record_grid::data::record_store::LoadOutcome;
    use record_grid::error::GridError;
    use record_grid::services::DataLoaderService;
    use record_grid::GridController;
    use std::sync::Arc;
    use std::time::Duration;

    fn batch(ids: &[i64], label: &str) -> Vec<RawRecord> {
        ids.iter()
            .map(|&id| {
                RawRecord::new(
                    id,
                    &format!("{} {}", label, id),
                    &format!("{}{}@gardner.biz", label, id),
                    label,
                )
            })
            .collect()
    }

    fn names(grid: &GridController) -> Vec<String> {
        grid.store()
            .snapshot()
            .iter()
            .map(|r| r.get_as_string("name"))
            .collect()
    }

    #[tokio::test]
    async fn test_slow_older_load_does_not_overwrite_newer() {
        let mut grid = GridController::default();
        let mut loader = DataLoaderService::new();

        let slow = Arc::new(
            StaticDataSource::new(batch(&[1, 2, 3], "old")).with_delay(Duration::from_millis(150)),
        );
        let fast = Arc::new(StaticDataSource::new(batch(&[7, 8], "new")));

        let first = loader.start_load(&mut grid, slow);
        let second = loader.start_load(&mut grid, fast);
        assert!(first < second);

        let outcomes = loader.drain(&mut grid).await;
        assert_eq!(
            outcomes,
            vec![
                Ok(LoadOutcome::Applied {
                    seq: second.0,
                    records: 2
                }),
                Ok(LoadOutcome::Stale {
                    seq: first.0,
                    current: second.0
                }),
            ]
        );
        assert_eq!(names(&grid), vec!["new 7", "new 8"]);
        assert!(!grid.is_loading());
        assert_eq!(loader.pending(), 0);
    }

    #[tokio::test]
    async fn test_loading_until_newest_completes() {
        let mut grid = GridController::default();
        let mut loader = DataLoaderService::new();

        loader.start_load(&mut grid, Arc::new(StaticDataSource::new(batch(&[1], "a"))));
        loader.start_load(
            &mut grid,
            Arc::new(
                StaticDataSource::new(batch(&[2], "b")).with_delay(Duration::from_millis(100)),
            ),
        );
        assert!(grid.render_state().loading);

        // the older, faster load lands first; the newer one is still in flight
        loader.apply_next(&mut grid).await.unwrap().unwrap();
        assert!(grid.is_loading());
        assert_eq!(names(&grid), vec!["a 1"]);

        loader.apply_next(&mut grid).await.unwrap().unwrap();
        assert!(!grid.is_loading());
        assert_eq!(names(&grid), vec!["b 2"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_last_good_snapshot() {
        let mut grid = GridController::default();
        let outcome = grid
            .load_from(&StaticDataSource::new(batch(&[1, 2], "good")))
            .await
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Applied { records: 2, .. }));

        let mut loader = DataLoaderService::new();
        loader.start_load(&mut grid, Arc::new(StaticDataSource::failing("connection refused")));
        let result = loader.apply_next(&mut grid).await.unwrap();

        assert_eq!(
            result,
            Err(GridError::LoadFailed("connection refused".to_string()))
        );
        assert_eq!(names(&grid), vec!["good 1", "good 2"]);

        let state = grid.render_state();
        assert_eq!(state.rows.len(), 2);
        assert!(!state.loading);
        assert!(matches!(state.load_error, Some(GridError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn test_stale_failure_is_ignored() {
        let mut grid = GridController::default();
        let mut loader = DataLoaderService::new();

        loader.start_load(
            &mut grid,
            Arc::new(StaticDataSource::failing("late failure").with_delay(Duration::from_millis(100))),
        );
        loader.start_load(&mut grid, Arc::new(StaticDataSource::new(batch(&[5], "ok"))));

        let outcomes = loader.drain(&mut grid).await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[1], Ok(LoadOutcome::Stale { .. })));
        assert!(grid.last_load_error().is_none());
        assert_eq!(names(&grid), vec!["ok 5"]);
    }

    #[tokio::test]
    async fn test_static_source_from_json() {
        let json = r#"[
            {"postId": 1, "id": 3, "name": "c", "email": "c@sydney.com", "body": "third"},
            {"postId": 1, "id": 1, "name": "a", "email": "a@gardner.biz", "body": "first"}
        ]"#;
        let source = StaticDataSource::from_json(json).unwrap();
        assert_eq!(source.describe(), "static batch of 2 records");

        let mut grid = GridController::default();
        grid.load_from(&source).await.unwrap();

        let state = grid.render_state();
        let ids: Vec<i64> = state.rows.iter().map(|r| r.key.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(state.rows[0].get_as_string("postId"), "1");
        assert_eq!(state.rows[0].get_as_string("age"), "21");
    }
}
