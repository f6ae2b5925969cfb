/// Transport commands accepted from clients, mapped to the keystrokes
/// omxplayer reads from its standard input. Sorted by name.
pub const COMMANDS: &[(&str, &[u8])] = &[
    ("backward", b"\x1b[D"),
    ("backward10", b"\x1b[B"),
    ("faster", b"2"),
    ("forward", b"\x1b[C"),
    ("forward10", b"\x1b[A"),
    ("info", b"z"),
    ("pause", b" "),
    ("slower", b"1"),
    ("subtitles", b"s"),
    ("voldown", b"-"),
    ("volup", b"+"),
];

/// Key sequence for a command name. Names are case-sensitive.
pub fn lookup(name: &str) -> Option<&'static [u8]> {
    COMMANDS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, keys)| *keys)
}

/// All command names in ascending order.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = COMMANDS.iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    names
}

/// Command names joined for display, e.g. in the invalid command response.
pub fn valid_commands() -> String {
    names().join(", ")
}
