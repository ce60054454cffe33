fn main() {
    // ESP-IDF link arguments are only needed for device builds; host builds
    // (tests, simulator) skip them entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
