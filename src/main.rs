fn main() -> anyhow::Result<()> {
    dust_racer_lib::run()
}
