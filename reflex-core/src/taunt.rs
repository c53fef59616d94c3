use alloc::{format, string::String};

use crate::rng::SeededRng;

pub const OPENING_TAUNT: &str = "Try to catch me!";

const TAUNTS: [&str; 9] = [
    "Too slow!",
    "Nice try!",
    "You'll never catch me!",
    "Is that your best?",
    "Getting warmer...",
    "Almost... not!",
    "Give up yet?",
    "I'm everywhere!",
    "Catch me if you can!",
];

/// Pick a taunt. One slot past the fixed list mentions the current level.
pub fn pick_taunt(rng: &mut SeededRng, level: u32) -> String {
    let slot = rng.next_int(TAUNTS.len() as u32 + 1) as usize;
    match TAUNTS.get(slot) {
        Some(taunt) => String::from(*taunt),
        None => format!("Level {level} and still trying?"),
    }
}
