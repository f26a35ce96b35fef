#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::config::{ManagerConfig, PoolConfig, PoolSizing, QueuePolicy, RetentionPolicy};
    use crate::error::SolverHubError;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    // -- pool sizing -------------------------------------------------------

    #[test]
    fn sizing_formulas_resolve_against_core_count() {
        assert_eq!(PoolSizing::Fixed(3).resolve(16), 3);
        assert_eq!(PoolSizing::PerCore(10).resolve(8), 80);
        assert_eq!(PoolSizing::CoreOffset(2).resolve(8), 6);
    }

    #[test]
    fn sizing_never_resolves_to_zero() {
        assert_eq!(PoolSizing::CoreOffset(2).resolve(2), 1);
        assert_eq!(PoolSizing::CoreOffset(8).resolve(1), 1);
        assert_eq!(PoolSizing::Fixed(0).resolve(8), 1);
        assert!(PoolSizing::default().resolved() >= 1);
    }

    #[test]
    fn sizing_parses_textual_forms() {
        assert_eq!("8".parse::<PoolSizing>().unwrap(), PoolSizing::Fixed(8));
        assert_eq!("cores".parse::<PoolSizing>().unwrap(), PoolSizing::PerCore(1));
        assert_eq!("cores*10".parse::<PoolSizing>().unwrap(), PoolSizing::PerCore(10));
        assert_eq!("cores - 2".parse::<PoolSizing>().unwrap(), PoolSizing::CoreOffset(2));
        assert!("threads".parse::<PoolSizing>().is_err());
        assert!("cores/2".parse::<PoolSizing>().is_err());
        assert!("cores*many".parse::<PoolSizing>().is_err());
    }

    #[test]
    fn sizing_display_parses_back() {
        for sizing in [PoolSizing::Fixed(5), PoolSizing::PerCore(1), PoolSizing::PerCore(4), PoolSizing::CoreOffset(2)] {
            assert_eq!(sizing.to_string().parse::<PoolSizing>().unwrap(), sizing);
        }
    }

    // -- defaults ----------------------------------------------------------

    #[test]
    fn manager_config_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.pool.sizing, PoolSizing::CoreOffset(2));
        assert_eq!(config.pool.queue, QueuePolicy::Unbounded);
        assert_eq!(config.retention, RetentionPolicy::Forever);
        assert_eq!(config.retention.retention(), None);
        assert_eq!(config.event_capacity, 256);
        assert!(config.validate().is_ok());
    }

    // -- TOML --------------------------------------------------------------

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_full_toml() {
        let config = ManagerConfig::from_toml_with(
            r#"
            event_capacity = 64

            [pool]
            sizing = "cores*10"
            queue = { kind = "bounded", capacity = 100 }

            [retention]
            kind = "after_terminal"
            seconds = 3600
            "#,
            no_env,
        )
        .unwrap();

        assert_eq!(config.pool.sizing, PoolSizing::PerCore(10));
        assert_eq!(config.pool.queue, QueuePolicy::Bounded { capacity: 100 });
        assert_eq!(config.retention.retention(), Some(Duration::from_secs(3600)));
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = ManagerConfig::from_toml_with("", no_env).unwrap();
        assert_eq!(config.pool, PoolConfig::default());
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn bad_sizing_in_toml_is_a_parse_error() {
        let err = ManagerConfig::from_toml_with("[pool]\nsizing = \"lots\"\n", no_env).unwrap_err();
        assert!(matches!(err, SolverHubError::ConfigParse(_)), "got {err:?}");
    }

    #[test]
    fn zero_capacity_bounded_queue_is_rejected() {
        let err = ManagerConfig::from_toml_with(
            "[pool]\nqueue = { kind = \"bounded\", capacity = 0 }\n",
            no_env,
        )
        .unwrap_err();
        assert!(matches!(err, SolverHubError::Config(_)));
    }

    #[test]
    fn overrides_apply_on_top_of_toml() {
        let lookup = lookup_from(&[("SOLVERHUB_QUEUE_CAPACITY", "5")]);
        let config = ManagerConfig::from_toml_with("[pool]\nsizing = \"3\"\n", lookup).unwrap();
        assert_eq!(config.pool.sizing, PoolSizing::Fixed(3));
        assert_eq!(config.pool.queue, QueuePolicy::Bounded { capacity: 5 });
    }

    // -- env overrides -----------------------------------------------------

    #[test]
    fn env_overrides_apply() {
        let config = ManagerConfig::from_lookup(lookup_from(&[
            ("SOLVERHUB_POOL_SIZING", "cores-1"),
            ("SOLVERHUB_QUEUE_CAPACITY", "10"),
            ("SOLVERHUB_RETENTION_SECS", "30"),
            ("SOLVERHUB_EVENT_CAPACITY", "8"),
        ]))
        .unwrap();

        assert_eq!(config.pool.sizing, PoolSizing::CoreOffset(1));
        assert_eq!(config.pool.queue, QueuePolicy::Bounded { capacity: 10 });
        assert_eq!(config.retention, RetentionPolicy::AfterTerminal { seconds: 30 });
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn zero_queue_capacity_means_unbounded() {
        let config =
            ManagerConfig::from_lookup(lookup_from(&[("SOLVERHUB_QUEUE_CAPACITY", "0")])).unwrap();
        assert_eq!(config.pool.queue, QueuePolicy::Unbounded);
    }

    #[test]
    fn profile_prefixed_keys_win() {
        let config = ManagerConfig::from_lookup(lookup_from(&[
            ("SOLVERHUB_PROFILE", "prod"),
            ("SOLVERHUB_POOL_SIZING", "2"),
            ("PROD_SOLVERHUB_POOL_SIZING", "cores*10"),
            ("SOLVERHUB_RETENTION_SECS", "forever"),
        ]))
        .unwrap();

        assert_eq!(config.pool.sizing, PoolSizing::PerCore(10));
        assert_eq!(config.retention, RetentionPolicy::Forever);
    }

    #[test]
    fn unparseable_override_keeps_default() {
        let config = ManagerConfig::from_lookup(lookup_from(&[
            ("SOLVERHUB_POOL_SIZING", "plenty"),
            ("SOLVERHUB_EVENT_CAPACITY", "-3"),
        ]))
        .unwrap();

        assert_eq!(config.pool.sizing, PoolSizing::default());
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn override_can_produce_invalid_config() {
        let err = ManagerConfig::from_lookup(lookup_from(&[("SOLVERHUB_POOL_SIZING", "0")]))
            .unwrap_err();
        assert!(matches!(err, SolverHubError::Config(_)));
    }
}
