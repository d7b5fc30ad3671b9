pub mod donationdtos;
