use terminal_size::{terminal_size, Width};

pub struct BannerInfo {
    pub version: String,
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub output_dir: String,
    pub playback: Option<String>,
}

pub fn print_startup_banner(info: &BannerInfo) {
    let term_width = terminal_size()
        .map(|(Width(w), _)| w as usize)
        .unwrap_or(80);

    // Speaker art lines (fixed width for alignment)
    let speaker = [
        r"     __       ",
        r"    |  \  )   ",
        r"  __|   \  )  ",
        r" |  |    | ) )",
        r" |__|   /  )  ",
        r"    |  /  )   ",
        r"              ",
    ];

    let title = format!("\x1b[1;35mVoicecast\x1b[0m v{}", info.version);
    let voice_line = format!("\x1b[90mVoice:\x1b[0m     \x1b[32m{}\x1b[0m", info.voice_id);
    let model_line = format!("\x1b[90mModel:\x1b[0m     \x1b[36m{}\x1b[0m", info.model_id);
    let format_line = format!("\x1b[90mFormat:\x1b[0m    {}", info.output_format);

    let output_dir = shorten_path(&info.output_dir, term_width.saturating_sub(30));
    let output_line = format!("\x1b[90mOutput:\x1b[0m    {}", output_dir);

    let playback_line = match &info.playback {
        None => "\x1b[90mPlayback:\x1b[0m  \x1b[32menabled\x1b[0m".to_string(),
        Some(reason) => format!("\x1b[90mPlayback:\x1b[0m  \x1b[90mdisabled ({reason})\x1b[0m"),
    };

    let info_lines: [&str; 7] = [
        &title,
        "",
        &voice_line,
        &model_line,
        &format_line,
        &output_line,
        &playback_line,
    ];

    println!();
    for (i, art_line) in speaker.iter().enumerate() {
        let info_line = info_lines.get(i).copied().unwrap_or("");
        println!("\x1b[33m{}\x1b[0m    {}", art_line, info_line);
    }
    println!();
}

fn shorten_path(path: &str, max_len: usize) -> String {
    let home = dirs::home_dir()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = if !home.is_empty() && path.starts_with(&home) {
        format!("~{}", &path[home.len()..])
    } else {
        path.to_string()
    };

    if path.len() <= max_len || max_len <= 3 {
        path
    } else {
        let mut start = path.len() - (max_len - 3);
        while !path.is_char_boundary(start) {
            start += 1;
        }
        format!("...{}", &path[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_path_kept() {
        assert_eq!(shorten_path("./audio_outputs", 40), "./audio_outputs");
    }

    #[test]
    fn test_long_path_truncated_from_left() {
        let shortened = shorten_path("/var/data/voicecast/audio_outputs", 15);
        assert_eq!(shortened, "...udio_outputs");
        assert_eq!(shortened.len(), 15);
    }
}
