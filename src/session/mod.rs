pub mod answer;
pub mod feedback;
pub mod result;
pub mod vocabulary;
