//! Statistics reporting.

use console::style;

use crate::api::UserInfo;
use crate::download::DownloadStats;

/// Print a user's profile.
pub fn print_user_profile(user: &UserInfo) {
    println!();
    println!("{}", style(format!("Profile @{}:", user.unique_id)).bold());
    println!("  User ID:   {}", user.uid);
    println!("  Followers: {}", user.follower_count);
    println!("  Following: {}", user.following_count);
    if !user.avatar_uri.is_empty() {
        println!("  Avatar:    {}", style(&user.avatar_uri).dim());
    }
}

/// Print statistics for a finished run.
pub fn print_run_stats(stats: &DownloadStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Statistics:").bold());
    println!("  Videos:      {}", stats.video_count);
    println!(
        "  Photo posts: {} ({} images)",
        stats.photo_post_count, stats.image_count
    );
    if stats.failed_count > 0 {
        println!("  Failed:      {}", style(stats.failed_count).red());
    }
    if stats.skipped_count > 0 {
        println!("  Skipped:     {} (not started)", style(stats.skipped_count).yellow());
    }
    println!(
        "  Total:       {} item(s), {} file(s)",
        stats.total_downloaded(),
        stats.total_files()
    );
    println!("{}", style("═".repeat(50)).dim());
}
