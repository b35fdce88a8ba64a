fn main() {
    println!("cargo:rerun-if-changed=sdkconfig.defaults");
    println!("cargo:rerun-if-env-changed=BLINKPUFF_CONFIG");

    // ESP-IDF link arguments; host builds (tests, fuzzing) have no IDF.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
