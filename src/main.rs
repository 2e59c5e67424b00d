fn main() {
    arena_shooter::game::run();
}
