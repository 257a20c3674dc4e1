//! In-memory frequency predictor.
//!
//! Each slot reads an optional seed corpus from the configured model
//! directories (`PATH`, `PATH_STATIC`, `PATH_PERSONALIZED`, in that order) and
//! grows from learned text. Scores are relative frequencies.
//!
//! Corpus files hold one entry per line, optionally followed by a tab and a
//! count. Lines starting with `#` are ignored.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use predbridge_protocol::{Candidate, Slot};
use predbridge_session::{
    ContextMode, ContextTracker, Prediction, Predictor, PredictorConfig, PredictorError,
    PredictorFactory,
};
use tracing::debug;

/// Words that must never be suggested, one per line.
pub const TOXIC_WORDS_FILE: &str = "toxic_words.txt";

/// Seed corpus file name for `slot`.
pub fn corpus_file(slot: Slot) -> &'static str {
    match slot {
        Slot::Word => "words.txt",
        Slot::Shorthand => "shorthand.txt",
        Slot::Sentence => "sentences.txt",
        Slot::Canned => "canned.txt",
    }
}

/// Builds one [`MemoryPredictor`] per slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryPredictorFactory;

impl PredictorFactory for MemoryPredictorFactory {
    fn create(
        &self,
        slot: Slot,
        _config: &PredictorConfig,
    ) -> Result<Box<dyn Predictor>, PredictorError> {
        Ok(Box::new(MemoryPredictor::new(slot)))
    }
}

#[derive(Debug)]
pub struct MemoryPredictor {
    slot: Slot,
    sources: Vec<PathBuf>,
    words: BTreeMap<String, u64>,
    phrases: BTreeMap<String, u64>,
    learned: Vec<String>,
    toxic: HashSet<String>,
    general_sentence_prediction: bool,
    retrieve_aac: bool,
}

impl MemoryPredictor {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            sources: Vec::new(),
            words: BTreeMap::new(),
            phrases: BTreeMap::new(),
            learned: Vec::new(),
            toxic: HashSet::new(),
            general_sentence_prediction: false,
            retrieve_aac: false,
        }
    }

    fn mode(&self) -> ContextMode {
        ContextMode::for_slot(self.slot)
    }

    fn load_sources(&mut self) -> Result<(), PredictorError> {
        self.words.clear();
        self.phrases.clear();
        let file = corpus_file(self.slot);
        for dir in self.sources.clone() {
            for (entry, count) in read_entries(&dir.join(file))? {
                self.absorb(&entry, count);
            }
        }
        for text in self.learned.clone() {
            self.absorb(&text, 1);
        }
        Ok(())
    }

    fn absorb(&mut self, text: &str, count: u64) {
        for token in tokens(text) {
            *self.words.entry(token).or_default() += count;
        }
        match self.slot {
            Slot::Word | Slot::Shorthand => {}
            Slot::Sentence => {
                for sentence in sentences(text) {
                    *self.phrases.entry(sentence.to_string()).or_default() += count;
                }
            }
            Slot::Canned => {
                let phrase = text.trim();
                if !phrase.is_empty() {
                    *self.phrases.entry(phrase.to_string()).or_default() += count;
                }
            }
        }
    }

    fn is_toxic(&self, text: &str) -> bool {
        !self.toxic.is_empty() && tokens(text).any(|token| self.toxic.contains(&token))
    }

    fn word_candidates(&self, fragment: &str) -> Vec<Candidate> {
        let fragment = fragment.to_lowercase();
        let total: u64 = self.words.values().sum();
        self.words
            .iter()
            .filter(|(word, _)| word.starts_with(&fragment) && **word != fragment)
            .filter(|(word, _)| !self.toxic.contains(*word))
            .map(|(word, count)| Candidate::new(word.clone(), relative(*count, total)))
            .collect()
    }

    fn sentence_candidates(&self, prefix: &str) -> Vec<Candidate> {
        let needle = prefix.trim().to_lowercase();
        if needle.is_empty() && !self.general_sentence_prediction {
            return Vec::new();
        }
        let total: u64 = self.phrases.values().sum();
        self.phrases
            .iter()
            .filter(|(phrase, _)| {
                let lowered = phrase.to_lowercase();
                lowered != needle
                    && (lowered.starts_with(&needle)
                        || (self.retrieve_aac && lowered.contains(&needle)))
            })
            .filter(|(phrase, _)| !self.is_toxic(phrase))
            .map(|(phrase, count)| Candidate::new(phrase.clone(), relative(*count, total)))
            .collect()
    }
}

impl Predictor for MemoryPredictor {
    fn initialize(&mut self, config: &PredictorConfig) -> Result<(), PredictorError> {
        let mut sources = Vec::new();
        for dir in [&config.path, &config.path_static, &config.path_personalized]
            .into_iter()
            .flatten()
        {
            if dir.exists() && !dir.is_dir() {
                return Err(PredictorError::Failed(format!(
                    "{} is not a directory",
                    dir.display()
                )));
            }
            sources.push(dir.clone());
        }
        self.sources = sources;
        self.general_sentence_prediction = config.general_sentence_prediction;
        self.retrieve_aac = config.retrieve_aac;
        self.load_sources()?;
        debug!(
            slot = %self.slot,
            words = self.words.len(),
            phrases = self.phrases.len(),
            "memory predictor loaded"
        );
        Ok(())
    }

    fn update_params(
        &mut self,
        general_sentence_prediction: bool,
        retrieve_aac: bool,
    ) -> Result<(), PredictorError> {
        self.general_sentence_prediction = general_sentence_prediction;
        self.retrieve_aac = retrieve_aac;
        Ok(())
    }

    fn read_updated_toxic_words(&mut self) -> Result<(), PredictorError> {
        let mut toxic = HashSet::new();
        for dir in &self.sources {
            for (word, _) in read_entries(&dir.join(TOXIC_WORDS_FILE))? {
                toxic.insert(word.to_lowercase());
            }
        }
        self.toxic = toxic;
        Ok(())
    }

    fn predict(&mut self, context: &ContextTracker) -> Result<Prediction, PredictorError> {
        let prefix = context.prefix();
        let prediction = match self.mode() {
            ContextMode::Word => Prediction {
                words: self.word_candidates(prefix),
                sentences: Vec::new(),
            },
            ContextMode::Sentence => {
                let fragment = if prefix.ends_with(char::is_whitespace) {
                    ""
                } else {
                    prefix.rsplit(char::is_whitespace).next().unwrap_or_default()
                };
                Prediction {
                    words: self.word_candidates(fragment),
                    sentences: self.sentence_candidates(prefix),
                }
            }
        };
        Ok(prediction)
    }

    fn learn(&mut self, text: &str) -> Result<(), PredictorError> {
        self.absorb(text, 1);
        self.learned.push(text.to_string());
        Ok(())
    }

    fn recreate_db(&mut self) -> Result<(), PredictorError> {
        self.load_sources()
    }
}

fn relative(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !(ch.is_alphanumeric() || ch == '\''))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
}

/// Read `entry[\tcount]` lines; a missing file reads as empty.
fn read_entries(path: &Path) -> Result<Vec<(String, u64)>, PredictorError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once('\t') {
            Some((entry, count)) => (entry.trim().to_string(), count.trim().parse().unwrap_or(1)),
            None => (line.to_string(), 1),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pbmem-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    fn config(slot: Slot, dir: Option<&Path>) -> PredictorConfig {
        PredictorConfig {
            slot,
            path: None,
            path_static: dir.map(Path::to_path_buf),
            path_personalized: None,
            general_sentence_prediction: false,
            retrieve_aac: false,
        }
    }

    fn typed(mode: ContextMode, text: &str) -> ContextTracker {
        let mut tracker = ContextTracker::new(mode);
        tracker.update(text);
        tracker
    }

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn word_slot_completes_from_seed_corpus() {
        let dir = temp_dir("words");
        fs::write(dir.join("words.txt"), "hello\t3\nhelp\nworld\n# comment\n").unwrap();

        let mut predictor = MemoryPredictor::new(Slot::Word);
        predictor.initialize(&config(Slot::Word, Some(&dir))).unwrap();
        let prediction = predictor
            .predict(&typed(ContextMode::Word, "say hel"))
            .unwrap();

        assert_eq!(texts(&prediction.words), ["hello", "help"]);
        assert_eq!(prediction.words[0].score, 0.6);
        assert!(prediction.sentences.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn learned_words_become_candidates() {
        let mut predictor = MemoryPredictor::new(Slot::Word);
        predictor.initialize(&config(Slot::Word, None)).unwrap();
        predictor.learn("hello world, hello there").unwrap();

        let prediction = predictor.predict(&typed(ContextMode::Word, "h")).unwrap();
        assert_eq!(texts(&prediction.words), ["hello"]);
    }

    #[test]
    fn toxic_words_are_filtered_after_reload() {
        let dir = temp_dir("toxic");
        fs::write(dir.join("sentences.txt"), "Have a darn good day.\nHave fun.\n").unwrap();

        let mut predictor = MemoryPredictor::new(Slot::Sentence);
        predictor
            .initialize(&config(Slot::Sentence, Some(&dir)))
            .unwrap();
        let context = typed(ContextMode::Sentence, "Have");
        assert_eq!(predictor.predict(&context).unwrap().sentences.len(), 2);

        fs::write(dir.join(TOXIC_WORDS_FILE), "Darn\n").unwrap();
        predictor.read_updated_toxic_words().unwrap();
        let prediction = predictor.predict(&context).unwrap();
        assert_eq!(texts(&prediction.sentences), ["Have fun."]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn canned_phrases_match_anywhere_only_with_aac_retrieval() {
        let mut predictor = MemoryPredictor::new(Slot::Canned);
        predictor.initialize(&config(Slot::Canned, None)).unwrap();
        predictor.learn("I need a glass of water").unwrap();

        let context = typed(ContextMode::Sentence, "water");
        assert!(predictor.predict(&context).unwrap().sentences.is_empty());

        predictor.update_params(false, true).unwrap();
        let prediction = predictor.predict(&context).unwrap();
        assert_eq!(texts(&prediction.sentences), ["I need a glass of water"]);
    }

    #[test]
    fn empty_prefix_offers_sentences_only_in_general_mode() {
        let mut predictor = MemoryPredictor::new(Slot::Sentence);
        predictor.initialize(&config(Slot::Sentence, None)).unwrap();
        predictor.learn("Good morning. See you later!").unwrap();

        let empty = ContextTracker::new(ContextMode::Sentence);
        assert!(predictor.predict(&empty).unwrap().sentences.is_empty());

        predictor.update_params(true, false).unwrap();
        let prediction = predictor.predict(&empty).unwrap();
        assert_eq!(
            texts(&prediction.sentences),
            ["Good morning.", "See you later!"]
        );
    }

    #[test]
    fn recreate_db_keeps_learned_phrases() {
        let dir = temp_dir("canned");
        fs::write(dir.join("canned.txt"), "Thank you\n").unwrap();

        let mut predictor = MemoryPredictor::new(Slot::Canned);
        predictor.initialize(&config(Slot::Canned, Some(&dir))).unwrap();
        predictor.learn("Thanks a lot").unwrap();
        fs::write(dir.join("canned.txt"), "Thank you\nThat works\n").unwrap();
        predictor.recreate_db().unwrap();

        let prediction = predictor
            .predict(&typed(ContextMode::Sentence, "th"))
            .unwrap();
        assert_eq!(
            texts(&prediction.sentences),
            ["Thank you", "Thanks a lot", "That works"]
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_as_model_directory_fails_initialization() {
        let dir = temp_dir("notadir");
        let file = dir.join("plain.txt");
        fs::write(&file, "x").unwrap();

        let mut predictor = MemoryPredictor::new(Slot::Word);
        let err = predictor
            .initialize(&config(Slot::Word, Some(&file)))
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        let _ = fs::remove_dir_all(&dir);
    }
}
