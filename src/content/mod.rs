pub mod kana;
pub mod vocabulary;
