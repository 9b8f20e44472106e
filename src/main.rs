fn main() -> Result<(), Box<dyn std::error::Error>> {
    graphchat::cli::main()
}
