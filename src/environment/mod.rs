pub mod cart_pole_environment;
pub mod maze_environment;
