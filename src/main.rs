use room_ngin::SceneConfig;

fn main() -> anyhow::Result<()> {
    room_ngin::run(SceneConfig::from_env())
}
