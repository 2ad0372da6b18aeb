fn main() {
    transtest::cli::run();
}
