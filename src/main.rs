fn main() {
    mediashare::run();
}
