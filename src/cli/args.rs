//! Command-line argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, DownloadMode, FilenameKey};

/// TikTok downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "tiktok-downloader",
    version,
    about = "Download videos and photo posts from TikTok",
    long_about = "A CLI tool to download TikTok videos and photo posts.\n\n\
                  Downloads the posts behind a list of share links, or every post of a user."
)]
pub struct Args {
    /// Share URL(s) to download. Can be given several times.
    #[arg(long = "url", num_args = 1..)]
    pub urls: Vec<String>,

    /// File with share URLs, separated by whitespace or newlines.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Username whose feed to download (implies --mode user).
    #[arg(short, long)]
    pub user: Option<String>,

    /// Download mode.
    #[arg(long, value_enum)]
    pub mode: Option<DownloadModeArg>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Filename components in order, comma separated (id, timestamp, description).
    #[arg(short = 'f', long = "format", value_delimiter = ',', value_enum)]
    pub filename_format: Option<Vec<FilenameKeyArg>>,

    /// Session cookie sent with signed requests.
    #[arg(long, env = "TIKTOK_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// External signer program.
    #[arg(short, long, env = "TIKTOK_SIGNER")]
    pub signer: Option<PathBuf>,

    /// Mobile client user agent string.
    #[arg(short = 'a', long = "user-agent")]
    pub user_agent: Option<String>,

    /// Simulated device ID.
    #[arg(long = "device-id")]
    pub device_id: Option<String>,

    /// Simulated install ID.
    #[arg(long = "install-id")]
    pub install_id: Option<String>,

    /// Milliseconds between API requests.
    #[arg(long = "delay")]
    pub request_delay_ms: Option<u64>,

    /// Per-request timeout in seconds.
    #[arg(long = "timeout")]
    pub request_timeout_secs: Option<u64>,

    /// Maximum number of feed items to collect in user mode.
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Write the collected feed items to a JSON file (user mode).
    #[arg(long)]
    pub list_json: Option<PathBuf>,

    /// Collect and list the feed without downloading (user mode).
    #[arg(long)]
    pub list_only: bool,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Hide download progress information.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI download mode argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DownloadModeArg {
    /// Download the posts behind share links.
    Links,
    /// Download every post of a user.
    User,
}

impl From<DownloadModeArg> for DownloadMode {
    fn from(arg: DownloadModeArg) -> Self {
        match arg {
            DownloadModeArg::Links => DownloadMode::Links,
            DownloadModeArg::User => DownloadMode::User,
        }
    }
}

/// CLI filename component argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilenameKeyArg {
    Id,
    Timestamp,
    Description,
}

impl From<FilenameKeyArg> for FilenameKey {
    fn from(arg: FilenameKeyArg) -> Self {
        match arg {
            FilenameKeyArg::Id => FilenameKey::Id,
            FilenameKeyArg::Timestamp => FilenameKey::Timestamp,
            FilenameKeyArg::Description => FilenameKey::Description,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.options.download_mode = mode.into();
        } else if self.user.is_some() {
            config.options.download_mode = DownloadMode::User;
        }

        // Override account settings if provided
        if let Some(cookie) = &self.cookie {
            config.account.cookie = cookie.clone();
        }

        if let Some(user_agent) = &self.user_agent {
            config.account.user_agent = user_agent.clone();
        }

        if let Some(device_id) = &self.device_id {
            config.device.device_id = Some(device_id.clone());
        }

        if let Some(install_id) = &self.install_id {
            config.device.install_id = Some(install_id.clone());
        }

        if let Some(signer) = &self.signer {
            config.signer.command = Some(signer.clone());
        }

        // Override options if provided
        if let Some(dir) = &self.download_directory {
            config.options.download_directory = Some(dir.clone());
        }

        if let Some(keys) = &self.filename_format {
            config.options.filename_format = keys.iter().copied().map(Into::into).collect();
        }

        if let Some(delay) = self.request_delay_ms {
            config.options.request_delay_ms = delay;
        }

        if let Some(timeout) = self.request_timeout_secs {
            config.options.request_timeout_secs = timeout;
        }

        if let Some(limit) = self.limit {
            config.options.feed_limit = limit;
        }

        if self.quiet {
            config.options.show_downloads = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_flag_implies_user_mode() {
        let args = Args::parse_from(["tiktok-downloader", "--user", "someone"]);
        let mut config = Config::default();
        args.merge_into_config(&mut config);
        assert_eq!(config.options.download_mode, DownloadMode::User);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "tiktok-downloader",
            "--url",
            "https://www.tiktok.com/@a/video/1",
            "--format",
            "timestamp,id",
            "--delay",
            "2500",
            "--signer",
            "/bin/signer",
            "--cookie",
            "sid=1",
        ]);
        let mut config = Config::default();
        args.merge_into_config(&mut config);

        assert_eq!(args.urls.len(), 1);
        assert_eq!(config.options.download_mode, DownloadMode::Links);
        assert_eq!(
            config.options.filename_format,
            vec![FilenameKey::Timestamp, FilenameKey::Id]
        );
        assert_eq!(config.options.request_delay_ms, 2500);
        assert_eq!(config.signer.command, Some(PathBuf::from("/bin/signer")));
        assert_eq!(config.cookie(), Some("sid=1"));
    }
}
