fn main() {
    // Only emit ESP-IDF link/env metadata when building for the target.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
