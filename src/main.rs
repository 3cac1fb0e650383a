fn main() -> anyhow::Result<()> {
    cosmic_landscape::run()
}
