fn main() {
    // ESP-IDF linkage is only needed for device builds.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
