use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Exit,
}

/// Tried in order against the normalized payload; the first keyword contained in it wins.
/// A payload mentioning both BUY and SELL is therefore a BUY.
pub const RULES: [(&str, Signal); 3] = [
    ("BUY", Signal::Buy),
    ("SELL", Signal::Sell),
    ("EXIT", Signal::Exit),
];

pub fn classify(payload: &str) -> Option<Signal> {
    let text = payload.trim().to_uppercase();
    RULES
        .iter()
        .find(|(keyword, _)| text.contains(*keyword))
        .map(|&(_, signal)| signal)
}
