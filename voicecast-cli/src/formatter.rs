use chrono::DateTime;
use voicecast_core::tts::{AccountInfo, Voice};

#[derive(Clone)]
pub struct Formatter {
    use_colors: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn print_system(&self, msg: &str) {
        if self.use_colors {
            println!("\x1b[33m[System]\x1b[0m {msg}");
        } else {
            println!("[System] {msg}");
        }
    }

    pub fn print_success(&self, msg: &str) {
        if self.use_colors {
            println!("\x1b[32m✓\x1b[0m {msg}");
        } else {
            println!("OK {msg}");
        }
    }

    pub fn print_error(&self, msg: &str) {
        if self.use_colors {
            eprintln!("\x1b[31m[Error]\x1b[0m {msg}");
        } else {
            eprintln!("[Error] {msg}");
        }
    }

    pub fn print_prompt(&self) -> String {
        if self.use_colors {
            "\x1b[35m>\x1b[0m ".to_string()
        } else {
            "> ".to_string()
        }
    }

    pub fn print_menu(&self, current_voice: &str) {
        let voice = if self.use_colors {
            format!("\x1b[36m{current_voice}\x1b[0m")
        } else {
            current_voice.to_string()
        };
        println!();
        println!("Choose an option (voice: {voice}):");
        println!("  1. Quick TTS");
        println!("  2. Batch convert");
        println!("  3. Test voice quality");
        println!("  4. Account status");
        println!("  5. Select voice");
        println!("  6. Exit");
    }

    pub fn print_account(&self, info: &AccountInfo) {
        if info.is_empty() {
            self.print_error("Account information unavailable");
            return;
        }

        let reset = DateTime::from_timestamp(info.next_character_count_reset_unix, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        println!();
        println!("  Email:        {}", info.email.as_deref().unwrap_or("-"));
        println!("  Tier:         {}", info.tier);
        println!(
            "  Characters:   {} / {} used ({} remaining)",
            info.character_count,
            info.character_limit,
            info.characters_remaining()
        );
        println!("  Resets:       {reset}");
        println!(
            "  Voice slots:  {} ({} professional)",
            info.voice_limit, info.professional_voice_limit
        );
        println!(
            "  Voice cloning: {}",
            if info.can_use_instant_voice_cloning {
                "available"
            } else {
                "not available"
            }
        );
    }

    pub fn print_voices(&self, voices: &[Voice], current_voice: &str) {
        println!();
        for (i, voice) in voices.iter().enumerate() {
            let marker = if voice.voice_id == current_voice { "*" } else { " " };
            let category = voice.category.as_deref().unwrap_or("-");
            if self.use_colors {
                println!(
                    " {marker}{:>3}. {} \x1b[90m({category}, {})\x1b[0m",
                    i + 1,
                    voice.name,
                    voice.voice_id
                );
            } else {
                println!(
                    " {marker}{:>3}. {} ({category}, {})",
                    i + 1,
                    voice.name,
                    voice.voice_id
                );
            }
        }
    }
}
