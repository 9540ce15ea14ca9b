pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# VECTAIL CONFIGURATION
# =============================================================================
# Vectail tails log lines from stdin, normalizes them into structured records,
# embeds them in batches, and upserts them into a vector store. Records in
# collections with a TTL are removed by the sweeper after they expire.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/vectail/config.yml
#   3. /etc/vectail/config.yml

# =============================================================================
# STORE
# =============================================================================
# The vector store's HTTP endpoint (Qdrant).

store:
  url: http://localhost:6333
  # Per-request timeout
  timeout: 30s

# =============================================================================
# BATCH (optional)
# =============================================================================
# A batch is flushed when it reaches `size` records, or when no new line has
# arrived for `idle_timeout`, whichever happens first.

batch:
  size: 15
  idle_timeout: 3s

# =============================================================================
# COLLECTIONS (optional)
# =============================================================================
# Per-collection policies. Collections not listed here use the defaults
# (vector_size 384, no TTL). Omit `ttl` to keep records forever.

collections:
  universal-logs:
    vector_size: 384

  logs-ttl-7d:
    vector_size: 384
    ttl: 7d

# =============================================================================
# SWEEP (optional)
# =============================================================================
# The sweeper deletes expired records on a fixed interval. With no explicit
# list it visits every collection above that has a TTL.

sweep:
  interval: 6h
  # collections: [logs-ttl-7d]
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn starter_config_is_loadable() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(generate_starter_config().as_bytes()).unwrap();
        file.flush().unwrap();

        let config = parse::load_config(file.path()).unwrap();
        assert_eq!(config.store.url, "http://localhost:6333");
        assert_eq!(config.batch.size, 15);
        assert_eq!(
            config.collection("logs-ttl-7d").ttl,
            Some(std::time::Duration::from_secs(7 * 24 * 3600))
        );
    }
}
