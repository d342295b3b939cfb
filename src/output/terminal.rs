// Colored terminal output for the aggregated feed.
//
// This module handles all terminal-specific formatting: colors, the
// feed listing, the per-platform summary. The main.rs display code
// delegates here.

use colored::Colorize;

use crate::model::{Platform, Post};

/// Display an ordered feed in the terminal.
pub fn display_feed(posts: &[Post]) {
    if posts.is_empty() {
        println!("Feed is empty. Run the engine and open some timelines first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Aggregated Feed ({} posts) ===", posts.len()).bold()
    );
    println!();

    for post in posts {
        let time = post
            .effective_time()
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let engagement = post.engagement;

        println!(
            "  {} {} {}",
            colorize_platform(post.platform),
            format!("@{}", post.author.handle.trim_start_matches('@')).bold(),
            time.dimmed(),
        );
        if let Some(reposter) = &post.reposter {
            println!("    {} {}", "reshared by".dimmed(), reposter.dimmed());
        }
        println!("    {}", super::truncate_chars(&post.content, 140));
        println!(
            "    {}",
            format!(
                "{} replies  {} reposts  {} likes",
                engagement.replies, engagement.reposts, engagement.likes
            )
            .dimmed()
        );
        if !post.images.is_empty() {
            println!("    {}", format!("[{} images]", post.images.len()).dimmed());
        }
        println!();
    }

    // Per-platform summary
    for platform in [Platform::Twitter, Platform::Bluesky, Platform::Mastodon] {
        let count = posts.iter().filter(|p| p.platform == platform).count();
        if count > 0 {
            println!("  {} {} posts", colorize_platform(platform), count);
        }
    }
}

/// Colorize a platform tag.
fn colorize_platform(platform: Platform) -> colored::ColoredString {
    let tag = format!("[{}]", platform.as_str());
    match platform {
        Platform::Twitter => tag.blue(),
        Platform::Bluesky => tag.cyan(),
        Platform::Mastodon => tag.magenta(),
    }
}
