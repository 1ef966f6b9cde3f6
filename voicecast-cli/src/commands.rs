#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    QuickConvert,
    BatchConvert,
    TestVoice,
    AccountStatus,
    SelectVoice,
    Exit,
}

pub enum LocalCommandResult {
    Selected(MenuChoice),

    /// Input matched no menu entry
    Invalid { msg: String },
}

pub fn handle_local_command(input: &str) -> LocalCommandResult {
    let choice = match input.trim() {
        "1" => MenuChoice::QuickConvert,
        "2" => MenuChoice::BatchConvert,
        "3" => MenuChoice::TestVoice,
        "4" => MenuChoice::AccountStatus,
        "5" => MenuChoice::SelectVoice,
        "6" | "q" | "/quit" | "/exit" => MenuChoice::Exit,
        other => {
            return LocalCommandResult::Invalid {
                msg: format!("Invalid option '{other}', choose 1-6"),
            }
        }
    };
    LocalCommandResult::Selected(choice)
}

/// Parse a yes/no answer; anything unrecognised takes the default
pub fn parse_confirm(input: &str, default: bool) -> bool {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(input: &str) -> Option<MenuChoice> {
        match handle_local_command(input) {
            LocalCommandResult::Selected(choice) => Some(choice),
            LocalCommandResult::Invalid { .. } => None,
        }
    }

    #[test]
    fn test_menu_numbers() {
        assert_eq!(selected("1"), Some(MenuChoice::QuickConvert));
        assert_eq!(selected(" 2 "), Some(MenuChoice::BatchConvert));
        assert_eq!(selected("3"), Some(MenuChoice::TestVoice));
        assert_eq!(selected("4"), Some(MenuChoice::AccountStatus));
        assert_eq!(selected("5"), Some(MenuChoice::SelectVoice));
        assert_eq!(selected("6"), Some(MenuChoice::Exit));
        assert_eq!(selected("/quit"), Some(MenuChoice::Exit));
    }

    #[test]
    fn test_invalid_choice() {
        assert_eq!(selected("7"), None);
        assert_eq!(selected(""), None);
        assert_eq!(selected("quick"), None);
    }

    #[test]
    fn test_confirm_defaults() {
        assert!(parse_confirm("Y", false));
        assert!(parse_confirm("yes", false));
        assert!(!parse_confirm("n", true));
        assert!(parse_confirm("", true));
        assert!(!parse_confirm("maybe", false));
    }
}
