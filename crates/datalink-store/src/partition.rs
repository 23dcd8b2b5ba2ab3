//! Partition path generation
//!
//! Generates Hive-style partition directories under a sink base path:
//! `{base}/{key}={value}/.../part-00000.parquet`

/// Build the partition directory for one key-value combination.
///
/// Values are sanitized so a hostile field value cannot escape the sink
/// prefix or produce an invalid object name.
pub fn partition_dir(base: &str, keys: &[(String, String)]) -> String {
    let mut path = base.trim_end_matches('/').to_string();
    for (key, value) in keys {
        path.push('/');
        path.push_str(key);
        path.push('=');
        path.push_str(&sanitize_value(value));
    }
    path
}

/// Object name for the single data file inside a partition directory.
///
/// One file per partition per run; a re-run replaces the directory, so the
/// name can stay constant.
pub fn partition_file(dir: &str) -> String {
    format!("{}/part-00000.parquet", dir)
}

/// Sanitize a partition value for use in file paths
///
/// Replaces special characters with underscores to ensure valid paths
fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_partition_dir_layout() {
        let dir = partition_dir(
            "link/apiserver_events",
            &keys(&[("dt", "20240301"), ("ev", "touch")]),
        );
        assert_eq!(dir, "link/apiserver_events/dt=20240301/ev=touch");
    }

    #[test]
    fn test_base_trailing_slash_is_ignored() {
        let dir = partition_dir("link/events/", &keys(&[("dt", "20240301")]));
        assert_eq!(dir, "link/events/dt=20240301");
    }

    #[test]
    fn test_partition_file_name() {
        assert_eq!(
            partition_file("link/events/dt=20240301/ev=touch"),
            "link/events/dt=20240301/ev=touch/part-00000.parquet"
        );
    }

    #[test]
    fn test_sanitize_value() {
        assert_eq!(sanitize_value("coupon_get_imp"), "coupon_get_imp");
        assert_eq!(sanitize_value("a/b"), "a_b");
        assert_eq!(sanitize_value("a b.c"), "a_b_c");
        assert_eq!(sanitize_value("../../etc"), "______etc");
    }
}
