//! Command parsing: what a mention asks for, and the canned replies the bot
//! sends back.

use crate::types::{Command, Operation, ACCEPTED_EXTENSIONS};

/// Suffix table, most specific first. `BOMB BW` must win over `BW`.
const SUFFIXES: [(&str, Command); 5] = [
    ("BOMB BW", Command::new(Operation::PhotoBomb, true)),
    ("BOMB", Command::new(Operation::PhotoBomb, false)),
    ("SUCCESS BW", Command::new(Operation::Success, true)),
    ("SUCCESS", Command::new(Operation::Success, false)),
    ("BW", Command::new(Operation::SwapFaces, true)),
];

const DEFAULT_COMMAND: Command = Command::new(Operation::SwapFaces, false);

pub const HELP_TEXT: &str = "Mention me in a comment when you upload an image (jpg, png or gif) \
and I'll swap the faces in it.\n\
Add one of these at the end of the comment to change what happens:\n\
• `bomb` - photobomb the image\n\
• `success` - make it a success\n\
• `bw` - black & white output (also works as `bomb bw` and `success bw`)";

pub const APOLOGY_TEXT: &str = "Sorry, something went wrong while processing your image.";

/// Reply for a file share whose type the face replacer cannot read.
pub fn unsupported_type_text() -> String {
    format!(
        "Sorry, I can only handle these file types: {}",
        ACCEPTED_EXTENSIONS.join(", ")
    )
}

/// Map free text to a command by its trailing keyword(s). Case-insensitive.
pub fn classify(text: &str) -> Command {
    let normalized = text.trim().to_uppercase();
    SUFFIXES
        .iter()
        .find(|(suffix, _)| normalized.ends_with(suffix))
        .map(|(_, command)| *command)
        .unwrap_or(DEFAULT_COMMAND)
}

/// True when `help` appears as a standalone word.
pub fn is_help_request(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("help"))
}

/// The `<@U…>` tag Slack puts in the text when a user is mentioned.
pub fn mention_tag(bot_user_id: &str) -> String {
    format!("<@{bot_user_id}>")
}

pub fn mentions(text: &str, bot_user_id: &str) -> bool {
    !bot_user_id.is_empty() && text.contains(&mention_tag(bot_user_id))
}

/// Remove every mention of the bot and collapse the leftovers.
pub fn strip_mention(text: &str, bot_user_id: &str) -> String {
    text.replace(&mention_tag(bot_user_id), " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(op: Operation, bw: bool) -> Command {
        Command::new(op, bw)
    }

    #[test]
    fn bomb_bw_is_monochrome_photobomb() {
        assert_eq!(classify("<@U1> BOMB BW"), cmd(Operation::PhotoBomb, true));
        assert_eq!(classify("please bomb bw  "), cmd(Operation::PhotoBomb, true));
    }

    #[test]
    fn bomb_is_case_insensitive() {
        assert_eq!(classify("<@U1> bomb"), cmd(Operation::PhotoBomb, false));
        assert_eq!(classify("Bomb"), cmd(Operation::PhotoBomb, false));
    }

    #[test]
    fn success_variants() {
        assert_eq!(classify("<@U1> SUCCESS"), cmd(Operation::Success, false));
        assert_eq!(classify("<@U1> success bw"), cmd(Operation::Success, true));
    }

    #[test]
    fn bare_bw_is_monochrome_swap() {
        assert_eq!(classify("bw"), cmd(Operation::SwapFaces, true));
        assert_eq!(classify("<@U1> make it BW"), cmd(Operation::SwapFaces, true));
    }

    #[test]
    fn unmatched_text_is_plain_swap() {
        assert_eq!(classify(""), cmd(Operation::SwapFaces, false));
        assert_eq!(classify("   "), cmd(Operation::SwapFaces, false));
        assert_eq!(classify("<@U1> look at this"), cmd(Operation::SwapFaces, false));
    }

    #[test]
    fn keyword_must_be_trailing() {
        // Earlier revisions matched anywhere in the text; only the tail counts now.
        assert_eq!(classify("bomb this please"), cmd(Operation::SwapFaces, false));
        assert_eq!(classify("bw then bomb"), cmd(Operation::PhotoBomb, false));
    }

    #[test]
    fn help_is_a_whole_word() {
        assert!(is_help_request("<@U1> help"));
        assert!(is_help_request("HELP!"));
        assert!(!is_help_request("helpful bot"));
        assert!(!is_help_request(""));
    }

    #[test]
    fn mention_detection_and_stripping() {
        assert!(mentions("hey <@UBOT> bomb", "UBOT"));
        assert!(!mentions("hey <@UOTHER> bomb", "UBOT"));
        assert!(!mentions("anything", ""));
        assert_eq!(strip_mention("<@UBOT>   bomb  bw", "UBOT"), "bomb bw");
        assert_eq!(strip_mention("<@UBOT>", "UBOT"), "");
    }

    #[test]
    fn unsupported_reply_names_every_type() {
        let text = unsupported_type_text();
        for ext in ACCEPTED_EXTENSIONS {
            assert!(text.contains(ext));
        }
    }
}
