use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn generate_quiz_id(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
