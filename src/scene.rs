export![environment, image, settings, transport];
