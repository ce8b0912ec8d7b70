fn main() {
    pagefetch::log::init_tracing();
    pagefetch::cli::run();
}
