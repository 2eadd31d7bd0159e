fn main()
{
        if let Err(e) = orbis::run()
        {
                log::error!("Orbis failed: {e:#}");

                std::process::exit(1);
        }
}
