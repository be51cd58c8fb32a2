//! Session configuration.
//!
//! Loaded from code via the builder-style setters, or from JSON:
//!
//! ```
//! use sandesh_session::SessionConfig;
//!
//! let config = SessionConfig::from_json(r#"{ "max_send_buf_size": 8192 }"#).unwrap();
//! assert_eq!(config.max_send_buf_size, 8192);
//! assert_eq!(config.max_frame_len, None);
//! ```

use serde::Deserialize;

use crate::error::{Result, SessionError};
use crate::protocol::{DEFAULT_BUFFER_CAPACITY, MIN_FRAME_LEN};

/// Default flush threshold for opportunistic sends.
pub const DEFAULT_MAX_SEND_BUF_SIZE: usize = 4096;

/// Default size of the read buffer used by the stream driver.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Pending-buffer size at which an opportunistic send flushes.
    pub max_send_buf_size: usize,
    /// Optional cap on declared inbound frame length (`None` = unbounded).
    pub max_frame_len: Option<usize>,
    /// Initial capacity of the inbound accumulator.
    pub recv_buffer_capacity: usize,
    /// Chunk size for reads performed by the stream driver.
    pub read_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_send_buf_size: DEFAULT_MAX_SEND_BUF_SIZE,
            max_frame_len: None,
            recv_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the opportunistic flush threshold.
    pub fn max_send_buf_size(mut self, size: usize) -> Self {
        self.max_send_buf_size = size;
        self
    }

    /// Cap the declared length of inbound frames.
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = Some(len);
        self
    }

    /// Set the initial inbound accumulator capacity.
    pub fn recv_buffer_capacity(mut self, capacity: usize) -> Self {
        self.recv_buffer_capacity = capacity;
        self
    }

    /// Set the stream driver's read chunk size.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_send_buf_size == 0 {
            return Err(SessionError::InvalidConfig(
                "max_send_buf_size must be positive".to_string(),
            ));
        }
        if let Some(max) = self.max_frame_len {
            if max < MIN_FRAME_LEN {
                return Err(SessionError::InvalidConfig(format!(
                    "max_frame_len {} is below minimum frame length {}",
                    max, MIN_FRAME_LEN
                )));
            }
        }
        if self.read_buffer_size == 0 {
            return Err(SessionError::InvalidConfig(
                "read_buffer_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.max_send_buf_size, DEFAULT_MAX_SEND_BUF_SIZE);
        assert_eq!(config.max_frame_len, None);
        assert_eq!(config.recv_buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::new()
            .max_send_buf_size(1024)
            .max_frame_len(1 << 20)
            .recv_buffer_capacity(512)
            .read_buffer_size(2048);

        assert_eq!(config.max_send_buf_size, 1024);
        assert_eq!(config.max_frame_len, Some(1 << 20));
        assert_eq!(config.recv_buffer_capacity, 512);
        assert_eq!(config.read_buffer_size, 2048);
    }

    #[test]
    fn test_config_from_json_full() {
        let json = r#"{
            "max_send_buf_size": 100,
            "max_frame_len": 5000,
            "recv_buffer_capacity": 256,
            "read_buffer_size": 4096
        }"#;
        let config = SessionConfig::from_json(json).unwrap();
        assert_eq!(config.max_send_buf_size, 100);
        assert_eq!(config.max_frame_len, Some(5000));
    }

    #[test]
    fn test_config_from_json_empty_uses_defaults() {
        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_config_rejects_zero_send_buf() {
        let err = SessionConfig::from_json(r#"{ "max_send_buf_size": 0 }"#).unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_rejects_tiny_frame_cap() {
        let config = SessionConfig::new().max_frame_len(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_unknown_field() {
        let err = SessionConfig::from_json(r#"{ "max_send_buf": 10 }"#).unwrap_err();
        assert!(matches!(err, SessionError::Json(_)));
    }
}
