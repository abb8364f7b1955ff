fn main() -> std::io::Result<()> {
    lightide::run()
}
