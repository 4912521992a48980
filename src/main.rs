fn main() {
    bj_sim::cli::run();
}
