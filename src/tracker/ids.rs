//! Short-ID generation.
//!
//! IDs start three characters wide. Each position cycles through its own
//! shuffled copy of the alphabet, and positions advance odometer-style, so
//! consecutive IDs do not look sequential. Once every ID of the current
//! width has been produced, a new shuffled sequence is appended and the
//! width grows by one. State lives in the owning configuration under the
//! builtin `!ids.*` keys.

use std::cell::RefCell;
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::tracker::config::Config;
use crate::tracker::error::{Result, TrackerError};

const INITIAL_WIDTH: usize = 3;

pub struct IdGenerator {
    config: Rc<Config>,
    state: RefCell<Option<GenState>>,
}

struct GenState {
    alphabet: String,
    sequences: Vec<String>,
    next_id: String,
    count: u64,
    total: u64,
    modified: bool,
}

impl IdGenerator {
    /// Seeds `config` with the state of a brand-new generator.
    pub fn init(config: &Config, alphabet: &str) -> Result<()> {
        if alphabet.len() < 2 || !alphabet.is_ascii() {
            return Err(TrackerError::IllegalArgument(format!(
                "Unusable id alphabet: {}",
                alphabet
            )));
        }
        for (i, c) in alphabet.char_indices() {
            if alphabet[i + 1..].contains(c) {
                return Err(TrackerError::IllegalArgument(format!(
                    "Id alphabet contains {} twice",
                    c
                )));
            }
        }

        let sequences: Vec<String> = (0..INITIAL_WIDTH).map(|_| shuffled(alphabet)).collect();

        config.set("!ids.sequences.alphabet", alphabet)?;
        config.set("!ids.sequences.count", &sequences.len().to_string())?;
        for (i, seq) in sequences.iter().enumerate() {
            config.set(&format!("!ids.sequences.{}", i), seq)?;
        }
        config.set("!ids.count", "0")?;
        config.set("!ids.total", "0")?;
        config.set("!ids.next", &first_chars(&sequences))?;
        Ok(())
    }

    pub fn new(config: Rc<Config>) -> Self {
        Self {
            config,
            state: RefCell::new(None),
        }
    }

    /// Retrieves the current unemployed ID.
    pub fn get_id(&self) -> Result<String> {
        self.ensure_loaded()?;
        Ok(self.state.borrow().as_ref().unwrap().next_id.clone())
    }

    /// Signifies that the value returned by `get_id` was employed and
    /// computes the next ID.
    pub fn advance_id(&self) -> Result<()> {
        self.ensure_loaded()?;

        let mut borrow = self.state.borrow_mut();
        let state = borrow.as_mut().unwrap();

        let alphabet = state.alphabet.clone();
        let (next_id, count) = advance(
            &mut state.sequences,
            Some(&alphabet),
            state.next_id.clone(),
            state.count,
        )?;
        state.next_id = next_id;
        state.count = count;
        state.total += 1;
        state.modified = true;
        Ok(())
    }

    /// Number of IDs issued over the generator's lifetime.
    pub fn size(&self) -> Result<u64> {
        self.ensure_loaded()?;
        Ok(self.state.borrow().as_ref().unwrap().total)
    }

    /// Runs `visitor` once per issued ID, in order of generation.
    pub fn for_each_id(&self, mut visitor: impl FnMut(&str)) -> Result<()> {
        self.ensure_loaded()?;

        let borrow = self.state.borrow();
        let state = borrow.as_ref().unwrap();

        if state.sequences.len() < INITIAL_WIDTH {
            return Err(TrackerError::InvalidConfiguration(
                "Id sequences are missing".to_string(),
            ));
        }

        let mut sequences: Vec<String> = state.sequences[..INITIAL_WIDTH].to_vec();
        let mut spare = state.sequences[INITIAL_WIDTH..].iter();
        let mut id = first_chars(&sequences);
        let mut count = 0;

        for _ in 0..state.total {
            visitor(&id);

            let base = sequences[0].len() as u64;
            if field_index(count + 1, base) >= id.len() {
                match spare.next() {
                    Some(seq) => sequences.push(seq.clone()),
                    None => {
                        return Err(TrackerError::InvalidConfiguration(
                            "Id sequences are missing".to_string(),
                        ))
                    }
                }
            }
            let (next, new_count) = advance(&mut sequences, None, id, count)?;
            id = next;
            count = new_count;
        }

        Ok(())
    }

    /// Stores changed state back into the configuration.
    pub fn save(&self) -> Result<()> {
        let mut borrow = self.state.borrow_mut();
        let state = match borrow.as_mut() {
            Some(state) if state.modified => state,
            _ => return Ok(()),
        };

        self.config
            .set("!ids.sequences.alphabet", &state.alphabet)?;
        self.config.set("!ids.next", &state.next_id)?;
        self.config.set("!ids.count", &state.count.to_string())?;
        self.config.set("!ids.total", &state.total.to_string())?;

        self.config
            .set("!ids.sequences.count", &state.sequences.len().to_string())?;
        for (i, seq) in state.sequences.iter().enumerate() {
            self.config.set(&format!("!ids.sequences.{}", i), seq)?;
        }

        state.modified = false;
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.state.borrow().is_some() {
            return Ok(());
        }

        let alphabet = self.config.get("!ids.sequences.alphabet")?;
        let nseq = parse_int(&self.config.get("!ids.sequences.count")?)?;

        let mut sequences = Vec::with_capacity(nseq as usize);
        for seq in 0..nseq {
            sequences.push(self.config.get(&format!("!ids.sequences.{}", seq))?);
        }

        if sequences.is_empty() {
            return Err(TrackerError::InvalidConfiguration(
                "Id sequences are missing".to_string(),
            ));
        }

        let next_id = self.config.get("!ids.next")?;
        let count = parse_int(&self.config.get("!ids.count")?)?;
        let total = parse_int(&self.config.get("!ids.total")?)?;

        *self.state.borrow_mut() = Some(GenState {
            alphabet,
            sequences,
            next_id,
            count,
            total,
            modified: false,
        });
        Ok(())
    }
}

/// Turns an ID into the next one.
///
/// Source: The Art of Computer Programming, IV, 7.2.1.1.
fn advance(
    sequences: &mut Vec<String>,
    extend_with: Option<&str>,
    id: String,
    count: u64,
) -> Result<(String, u64)> {
    let base = sequences[0].len();
    let field = field_index(count + 1, base as u64);

    if field >= id.len() {
        if let Some(alphabet) = extend_with {
            sequences.push(shuffled(alphabet));
        }
        return Ok((first_chars(sequences), 0));
    }

    let seq = sequences[field].as_bytes();
    let current = id.as_bytes()[field];
    let pos = seq.iter().position(|&c| c == current).ok_or_else(|| {
        TrackerError::InvalidConfiguration(format!("Wrong character in id: {}", id))
    })?;

    let mut bytes = id.into_bytes();
    bytes[field] = seq[(pos + 1) % base];
    let id = String::from_utf8(bytes)
        .map_err(|_| TrackerError::InvalidConfiguration("Malformed id".to_string()))?;
    Ok((id, count + 1))
}

/// Calculates the number of the field to advance to get id number `k`
/// (1-based) with `base` characters per field.
fn field_index(k: u64, base: u64) -> usize {
    let mut p = 0;
    let mut i = 1;
    while i < k {
        i *= base;
        p += 1;
    }

    while p > 0 {
        if k % i == 0 {
            break;
        }
        i /= base;
        p -= 1;
    }
    p
}

fn first_chars(sequences: &[String]) -> String {
    sequences
        .iter()
        .filter_map(|seq| seq.chars().next())
        .collect()
}

fn shuffled(alphabet: &str) -> String {
    let mut chars: Vec<char> = alphabet.chars().collect();
    chars.shuffle(&mut thread_rng());
    chars.into_iter().collect()
}

fn parse_int(value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        TrackerError::InvalidConfiguration(format!("Malformed id generator state: {}", value))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const DIGITS: &str = "1234567890";

    fn fresh_config(alphabet: &str) -> Rc<Config> {
        let config = Rc::new(Config::in_memory(None));
        IdGenerator::init(&config, alphabet).unwrap();
        config
    }

    #[test]
    fn init_populates_config() {
        let config = Rc::new(Config::in_memory(None));
        assert!(!config.is_modified());
        IdGenerator::init(&config, DIGITS).unwrap();
        assert!(config.is_modified());
        assert_eq!(config.get("!ids.next").unwrap().len(), 3);
    }

    #[test]
    fn repeated_alphabet_characters_are_rejected() {
        let config = Config::in_memory(None);
        assert!(IdGenerator::init(&config, "abca").is_err());
    }

    #[test]
    fn save_without_changes_does_not_touch_config() {
        let parent = fresh_config(DIGITS);
        let child = Rc::new(Config::in_memory(Some(parent)));

        let generator = IdGenerator::new(Rc::clone(&child));
        assert!(!child.is_modified());
        generator.save().unwrap();
        assert!(!child.is_modified());
    }

    #[test]
    fn save_after_advance_updates_config() {
        let parent = fresh_config(DIGITS);
        let child = Rc::new(Config::in_memory(Some(parent)));

        let generator = IdGenerator::new(Rc::clone(&child));
        generator.advance_id().unwrap();
        assert!(!child.is_modified());
        generator.save().unwrap();
        assert!(child.is_modified());
    }

    #[test]
    fn ids_can_not_be_exhausted() {
        let config = fresh_config(DIGITS);
        let generator = IdGenerator::new(config);

        assert_eq!(generator.get_id().unwrap().len(), 3);

        for _ in 0..10 * 10 * 10 {
            generator.advance_id().unwrap();
        }

        assert_eq!(generator.get_id().unwrap().len(), 4);
    }

    #[test]
    fn all_ids_are_distinct() {
        let config = fresh_config(DIGITS);
        let generator = IdGenerator::new(config);

        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generator.get_id().unwrap()));
            generator.advance_id().unwrap();
        }
    }

    #[test]
    fn extended_state_survives_save_and_reload() {
        let config = fresh_config(DIGITS);

        let generator = IdGenerator::new(Rc::clone(&config));
        for _ in 0..100_000 {
            generator.advance_id().unwrap();
        }
        generator.save().unwrap();

        let reloaded = IdGenerator::new(config);
        assert_eq!(reloaded.get_id().unwrap().len(), 5);
        assert_eq!(reloaded.size().unwrap(), 100_000);
    }

    #[test]
    fn replay_visits_issued_ids_in_order() {
        let config = fresh_config(DIGITS);
        let generator = IdGenerator::new(config);

        let mut issued = Vec::new();
        for _ in 0..1500 {
            issued.push(generator.get_id().unwrap());
            generator.advance_id().unwrap();
        }

        let mut replayed = Vec::new();
        generator.for_each_id(|id| replayed.push(id.to_string())).unwrap();
        assert_eq!(replayed, issued);
    }
}
