use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref CLITIC: Regex = Regex::new(r"^(.+?)(n't|'s|'re|'ve|'ll|'d|'m)$").expect("valid regex");
    static ref DELIMITER: Regex = Regex::new(r#"[\[\](){}<>;@#$%&"?!]"#).expect("valid regex");
    static ref COMMA_COLON: Regex = Regex::new(r"([,:])(\D)").expect("valid regex");
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn","couldn't",
            "d","did","didn","didn't","do","does","doesn","doesn't","doing","don","don't","down","during",
            "each","few","for","from","further",
            "had","hadn","hadn't","has","hasn","hasn't","have","haven","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn","isn't","it","it's","its","itself",
            "just","let's","ll","m","ma","me","mightn","mightn't","more","most","mustn","mustn't","my","myself",
            "needn","needn't","no","nor","not","now",
            "o","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "re","s","same","shan","shan't","she","she'd","she'll","she's","should","should've","shouldn","shouldn't","so","some","such",
            "t","than","that","that'll","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","wasn't","we","we'd","we'll","we're","we've","were","weren","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","will","with","won","won't","would","wouldn","wouldn't",
            "y","you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Splits normalized text into word tokens.
pub trait WordTokenizer: Send + Sync {
    /// Stable identifier, part of the preprocessing signature.
    fn name(&self) -> &str;
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Penn Treebank style splitting: brackets, quotes, `;@#$%&?!` anywhere and
/// `,`/`:` not followed by a digit become separate tokens, remaining edge
/// punctuation is split off each whitespace chunk, English clitics (`n't`,
/// `'s`, ...) are split off the word. Text is NFKC-normalized first so PDF ligatures become plain
/// letters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreebankTokenizer;

impl WordTokenizer for TreebankTokenizer {
    fn name(&self) -> &str { "treebank-v1" }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized: String = text.nfkc().map(|c| if c == '\u{2019}' { '\'' } else { c }).collect();
        let spaced = DELIMITER.replace_all(&normalized, " $0 ");
        let spaced = COMMA_COLON.replace_all(&spaced, " $1 $2");
        let mut tokens = Vec::new();
        for chunk in spaced.split_whitespace() {
            split_chunk(chunk, &mut tokens);
        }
        tokens
    }
}

fn split_chunk(chunk: &str, tokens: &mut Vec<String>) {
    let is_edge = |c: char| !c.is_alphanumeric();
    let rest = chunk.trim_start_matches(is_edge);
    let lead = &chunk[..chunk.len() - rest.len()];
    let word = rest.trim_end_matches(is_edge);
    let trail = &rest[word.len()..];

    tokens.extend(lead.chars().map(String::from));
    if !word.is_empty() {
        match CLITIC.captures(word) {
            Some(caps) => {
                tokens.push(caps[1].to_string());
                tokens.push(caps[2].to_string());
            }
            None => tokens.push(word.to_string()),
        }
    }
    tokens.extend(trail.chars().map(String::from));
}

/// Letters only. Python's `str.isalpha` semantics: non-empty and every char alphabetic.
pub fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Dutch,
}

impl Language {
    pub fn algorithm(self) -> Algorithm {
        match self {
            Language::English => Algorithm::English,
            Language::German => Algorithm::German,
            Language::French => Algorithm::French,
            Language::Spanish => Algorithm::Spanish,
            Language::Italian => Algorithm::Italian,
            Language::Portuguese => Algorithm::Portuguese,
            Language::Dutch => Algorithm::Dutch,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::German => "german",
            Language::French => "french",
            Language::Spanish => "spanish",
            Language::Italian => "italian",
            Language::Portuguese => "portuguese",
            Language::Dutch => "dutch",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn english() -> Self {
        Self::from_words(ENGLISH_STOPWORDS.iter().copied())
    }

    /// Built-in list for `language`. Only English ships one.
    pub fn for_language(language: Language) -> Option<Self> {
        match language {
            Language::English => Some(Self::english()),
            _ => None,
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect() }
    }

    pub fn none() -> Self { Self::default() }

    pub fn contains(&self, token: &str) -> bool { self.words.contains(token) }
    pub fn len(&self) -> usize { self.words.len() }
    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    /// Words in sorted order, for hashing.
    pub fn sorted(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        words.sort_unstable();
        words
    }
}
