fn main() -> Result<(), Box<dyn std::error::Error>> {
    audiofolio::runtime::run()
}
